//! Bounded collection of live Cards owned by one Chassis.

use crate::card::Card;
use crate::error::{CardErr, Error, Result};

pub struct CardDatabase {
    capacity: usize,
    cards: Vec<Box<dyn Card>>,
}

impl CardDatabase {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cards: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, card: Box<dyn Card>) -> Result<()> {
        if self.cards.len() >= self.capacity {
            return Err(CardErr::MemoryCard.full());
        }
        self.cards.push(card);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Card>> {
        self.cards.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Card>> {
        self.cards.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
