use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;

use super::gesture::{CardStyle, Direction, GestureConfig, GesturePhase, GestureTracker, PointerEvent, Release};

/// Cards still animating off-screen beyond this count are finished eagerly.
const MAX_ANIMATING: usize = 4;

/// A committed swipe, reported once per card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision<K> {
    pub key: K,
    pub direction: Direction,
    pub target: CardStyle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFrame<K> {
    pub key: K,
    pub style: CardStyle,
    pub phase: GesturePhase,
    pub interactive: bool,
}

#[derive(Debug, Clone)]
struct Card<K> {
    key: K,
    gesture: GestureTracker,
}

/// Stack of swipeable cards. Only the head card reacts to input; a key is
/// shown at most once and never comes back after a decision.
#[derive(Debug, Clone)]
pub struct CardStack<K> {
    config: GestureConfig,
    cards: Vec<Card<K>>,
    decided: HashSet<K>,
}

impl<K: Clone + Eq + Hash> CardStack<K> {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            cards: Vec::new(),
            decided: HashSet::new(),
        }
    }

    /// Aligns the waiting cards with the candidate queue. Cards already
    /// animating out are kept; decided keys are never re-admitted.
    pub fn sync<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<K> = keys.into_iter().filter(|k| !self.decided.contains(k)).collect();
        let wanted: HashSet<&K> = keys.iter().collect();

        let mut animating = Vec::new();
        let mut waiting = Vec::new();
        for card in self.cards.drain(..) {
            match card.gesture.phase() {
                GesturePhase::Committed(_) => animating.push(card),
                GesturePhase::Dismissed => {}
                _ if wanted.contains(&card.key) => waiting.push(card),
                _ => {}
            }
        }

        if animating.len() > MAX_ANIMATING {
            animating.drain(..animating.len() - MAX_ANIMATING);
        }

        let mut ordered = Vec::with_capacity(keys.len());
        let mut placed = HashSet::new();
        for key in keys {
            if !placed.insert(key.clone()) {
                continue;
            }
            match waiting.iter().position(|c| c.key == key) {
                Some(pos) => ordered.push(waiting.swap_remove(pos)),
                None => ordered.push(Card {
                    key,
                    gesture: GestureTracker::new(self.config),
                }),
            }
        }

        self.cards = animating;
        self.cards.extend(ordered);
    }

    pub fn head(&self) -> Option<&K> {
        self.head_index().map(|i| &self.cards[i].key)
    }

    pub fn head_style(&self) -> Option<CardStyle> {
        self.head_index().map(|i| self.cards[i].gesture.style())
    }

    /// Routes a pointer event to the head card.
    pub fn pointer(&mut self, event: PointerEvent) -> Option<Decision<K>> {
        let index = self.head_index()?;
        match self.cards[index].gesture.handle(event)? {
            Release::Commit(direction) => Some(self.decide(index, direction)),
            Release::Cancel => None,
        }
    }

    /// Fixed like/skip controls: same decision path as a committed drag.
    pub fn press(&mut self, direction: Direction) -> Option<Decision<K>> {
        let index = self.head_index()?;
        if !self.cards[index].gesture.commit(direction) {
            return None;
        }
        Some(self.decide(index, direction))
    }

    /// Called when a dismissed card's off-screen animation has completed.
    pub fn finish_animation(&mut self, key: &K) -> bool {
        let Some(pos) = self.cards.iter().position(|c| &c.key == key) else {
            return false;
        };
        if !self.cards[pos].gesture.finish() {
            return false;
        }
        self.cards.remove(pos);
        true
    }

    pub fn frames(&self) -> Vec<CardFrame<K>> {
        let head = self.head_index();
        self.cards
            .iter()
            .enumerate()
            .map(|(i, c)| CardFrame {
                key: c.key.clone(),
                style: c.gesture.style(),
                phase: c.gesture.phase(),
                interactive: Some(i) == head,
            })
            .collect()
    }

    fn head_index(&self) -> Option<usize> {
        self.cards.iter().position(|c| c.gesture.is_interactive())
    }

    fn decide(&mut self, index: usize, direction: Direction) -> Decision<K> {
        let card = &self.cards[index];
        self.decided.insert(card.key.clone());
        Decision {
            key: card.key.clone(),
            direction,
            target: card.gesture.style(),
        }
    }
}
