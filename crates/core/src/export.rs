use crate::error::Result;
use crate::model::LayoutLeaf;
use crate::playback::Frame;

pub fn to_csv<'a>(
    leaves: impl IntoIterator<Item = &'a LayoutLeaf>,
    mut w: impl std::io::Write,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["domain", "package", "weight", "x0", "y0", "x1", "y1"])?;
    for leaf in leaves {
        let r = leaf.rect;
        writer.write_record([
            leaf.identity.domain.clone(),
            leaf.identity.package.clone(),
            leaf.weight.to_string(),
            r.x0.to_string(),
            r.y0.to_string(),
            r.x1.to_string(),
            r.y1.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_json(frame: &Frame) -> serde_json::Value {
    let rect = |r: &crate::model::Rect| serde_json::json!([r.x0, r.y0, r.x1, r.y1]);
    serde_json::json!({
        "slice": frame.slice_index,
        "label": frame.label,
        "duration_ms": frame.plan.timing.duration_ms,
        "domains": frame.domains.iter().map(|d| serde_json::json!({
            "domain": d.key,
            "color": d.color.to_string(),
            "rect": rect(&d.rect),
        })).collect::<Vec<_>>(),
        "enter": frame.plan.enters.iter().map(|l| serde_json::json!({
            "id": l.identity.to_string(),
            "to": rect(&l.rect),
        })).collect::<Vec<_>>(),
        "update": frame.plan.updates.iter().map(|u| serde_json::json!({
            "id": u.leaf.identity.to_string(),
            "from": rect(&u.from),
            "to": rect(&u.leaf.rect),
        })).collect::<Vec<_>>(),
        "exit": frame.plan.exits.iter().map(|e| serde_json::json!({
            "id": e.identity.to_string(),
            "from": rect(&e.from),
        })).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, Rect};
    use crate::palette::normalize;
    use crate::playback::DomainHeader;
    use crate::transition::{Timing, TransitionPlan};

    fn leaf() -> LayoutLeaf {
        LayoutLeaf {
            identity: Identity::new("finance", "billing-api"),
            rect: Rect::new(0.0, 20.0, 60.0, 80.0),
            weight: 120.0,
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut out = Vec::new();
        to_csv(&[leaf()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "domain,package,weight,x0,y0,x1,y1\nfinance,billing-api,120,0,20,60,80\n");
    }

    #[test]
    fn json_lists_actions() {
        let frame = Frame {
            slice_index: 4,
            label: "Apr '22".into(),
            bounds: Rect::from_size(100.0, 100.0),
            domains: vec![DomainHeader {
                key: "finance".into(),
                rect: Rect::from_size(100.0, 100.0),
                color: normalize("#624584").unwrap(),
            }],
            plan: TransitionPlan {
                timing: Timing { duration_ms: 225, ease: Default::default() },
                enters: vec![leaf()],
                updates: Vec::new(),
                exits: Vec::new(),
            },
        };
        let json = to_json(&frame);
        assert_eq!(json["slice"], 4);
        assert_eq!(json["domains"][0]["color"], "rgb(98, 69, 132)");
        assert_eq!(json["enter"][0]["id"], "finance/billing-api");
        assert_eq!(json["enter"][0]["to"][3], 80.0);
        assert!(json["exit"].as_array().unwrap().is_empty());
    }
}
