//! Traffic light model.
//!
//! The traffic light of Baier and Katoen, "Principles of Model Checking",
//! section 4.4.1. The regular light alternates between red and green, so it
//! satisfies `globally finally green`. The energy-saving variant may also
//! switch off from red, and an unlit light may stay off forever, so it does
//! not.

use std::fmt::{Debug, Formatter};

use crate::bitset::BitSet;
use crate::system::{ActionId, LabelId, TransitionSystem, Vocabulary};

/// State of the light: one slot per lamp.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Light([u32; 2]);

impl Light {
    pub const RED: Light = Light([1, 0]);
    pub const GREEN: Light = Light([0, 1]);
    pub const OFF: Light = Light([0, 0]);

    pub fn is_red(&self) -> bool {
        self.0[0] != 0
    }

    pub fn is_green(&self) -> bool {
        self.0[1] != 0
    }
}

impl AsRef<[u32]> for Light {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

impl Debug for Light {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.is_red(), self.is_green()) {
            (true, false) => write!(f, "red"),
            (false, true) => write!(f, "green"),
            (false, false) => write!(f, "off"),
            (true, true) => write!(f, "red+green"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stoplight {
    eco: bool,
    vocabulary: Vocabulary,
    red: LabelId,
    green: LabelId,
}

impl Stoplight {
    pub fn new(eco: bool) -> Self {
        let mut vocabulary = Vocabulary::new();
        let red = vocabulary.add_label("red");
        let green = vocabulary.add_label("green");
        Self {
            eco,
            vocabulary,
            red,
            green,
        }
    }

    /// The light alternating between red and green.
    pub fn regular() -> Self {
        Self::new(false)
    }

    /// The energy-saving light, which may switch off.
    pub fn eco() -> Self {
        Self::new(true)
    }

    pub fn is_eco(&self) -> bool {
        self.eco
    }
}

impl TransitionSystem for Stoplight {
    type State = Light;

    fn initial_state(&self) -> Light {
        Light::RED
    }

    fn next_states(&self, state: &Light) -> Vec<(Light, Option<ActionId>)> {
        let next = if state.is_red() {
            if self.eco {
                vec![Light::GREEN, Light::OFF]
            } else {
                vec![Light::GREEN]
            }
        } else if state.is_green() {
            vec![Light::RED]
        } else {
            assert!(self.eco, "Regular light switched off");
            vec![Light::RED, Light::OFF]
        };
        next.into_iter().map(|s| (s, None)).collect()
    }

    fn labels(&self, state: &Light) -> BitSet {
        let mut labels = BitSet::empty();
        if state.is_red() {
            labels.insert(self.red.index());
        }
        if state.is_green() {
            labels.insert(self.green.index());
        }
        labels
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}
