//! Identity-keyed enter/update/exit planning between consecutive frames.

use crate::ease::Ease;
use crate::error::{Error, Result};
use crate::model::{Identity, LayoutLeaf, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub duration_ms: u64,
    pub ease: Ease,
}

impl Timing {
    pub fn new(duration: Duration, ease: Ease) -> Self {
        Self {
            duration_ms: duration.as_millis() as u64,
            ease,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Eased progress after `elapsed`; a zero duration is always complete.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        self.ease
            .apply(elapsed.as_secs_f64() / self.duration().as_secs_f64())
    }

    pub fn is_done(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub from: Rect,
    pub leaf: LayoutLeaf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub identity: Identity,
    pub from: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Enter,
    Update,
    Exit,
}

/// One element's animation, start and end geometry resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion<'a> {
    pub kind: MotionKind,
    pub identity: &'a Identity,
    pub from: Rect,
    pub to: Rect,
}

impl Motion<'_> {
    pub fn rect_at(&self, progress: f64) -> Rect {
        self.from.lerp(&self.to, progress)
    }
}

/// Declarative plan for one frame. The renderer interpolates every motion
/// over `timing` and drops exited elements once they finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPlan {
    pub timing: Timing,
    pub enters: Vec<LayoutLeaf>,
    pub updates: Vec<Update>,
    pub exits: Vec<Exit>,
}

impl TransitionPlan {
    pub fn len(&self) -> usize {
        self.enters.len() + self.updates.len() + self.exits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leaves present after this transition.
    pub fn leaves(&self) -> impl Iterator<Item = &LayoutLeaf> + '_ {
        self.enters.iter().chain(self.updates.iter().map(|u| &u.leaf))
    }

    pub fn motions(&self) -> impl Iterator<Item = Motion<'_>> + '_ {
        let enters = self.enters.iter().map(|leaf| Motion {
            kind: MotionKind::Enter,
            identity: &leaf.identity,
            from: leaf.rect.collapsed(),
            to: leaf.rect,
        });
        let updates = self.updates.iter().map(|u| Motion {
            kind: MotionKind::Update,
            identity: &u.leaf.identity,
            from: u.from,
            to: u.leaf.rect,
        });
        let exits = self.exits.iter().map(|e| Motion {
            kind: MotionKind::Exit,
            identity: &e.identity,
            from: e.from,
            to: e.from.collapsed(),
        });
        enters.chain(updates).chain(exits)
    }
}

/// Diffs each frame against the one before it. Only one generation of
/// history is kept.
#[derive(Debug, Clone)]
pub struct TransitionScheduler {
    timing: Timing,
    previous: Vec<(Identity, Rect)>,
    index: HashMap<Identity, usize>,
}

impl TransitionScheduler {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            previous: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn previous_rect(&self, identity: &Identity) -> Option<Rect> {
        self.index.get(identity).map(|&i| self.previous[i].1)
    }

    pub fn history_len(&self) -> usize {
        self.previous.len()
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.index.clear();
    }

    /// Plans the move from the remembered frame to `leaves`, then remembers
    /// `leaves`. History is left untouched when `leaves` repeats an identity.
    pub fn plan(&mut self, leaves: &[LayoutLeaf]) -> Result<TransitionPlan> {
        let mut current: HashSet<&Identity> = HashSet::with_capacity(leaves.len());
        let mut enters = Vec::new();
        let mut updates = Vec::new();
        for leaf in leaves {
            if !current.insert(&leaf.identity) {
                return Err(Error::DuplicateIdentity {
                    domain: leaf.identity.domain.clone(),
                    package: leaf.identity.package.clone(),
                });
            }
            match self.previous_rect(&leaf.identity) {
                Some(from) => updates.push(Update {
                    from,
                    leaf: leaf.clone(),
                }),
                None => enters.push(leaf.clone()),
            }
        }
        let exits: Vec<Exit> = self
            .previous
            .iter()
            .filter(|(identity, _)| !current.contains(identity))
            .map(|(identity, rect)| Exit {
                identity: identity.clone(),
                from: *rect,
            })
            .collect();

        self.previous = leaves.iter().map(|l| (l.identity.clone(), l.rect)).collect();
        self.index = self
            .previous
            .iter()
            .enumerate()
            .map(|(i, (identity, _))| (identity.clone(), i))
            .collect();

        tracing::debug!(
            enters = enters.len(),
            updates = updates.len(),
            exits = exits.len(),
            "planned transition"
        );
        Ok(TransitionPlan {
            timing: self.timing,
            enters,
            updates,
            exits,
        })
    }
}
