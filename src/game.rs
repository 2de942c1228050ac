use rand::Rng;

use crate::card::Card;
use crate::error::StackError;
use crate::rules::Rules;
use crate::stack::{Deck, FieldStack, Foundation, Hand};

/// All mutable state of one attempt: the deck, the hand, the field piles
/// and the foundation. Built fresh per attempt and discarded afterwards.
#[derive(Debug, Clone)]
pub struct Game {
    pub deck: Deck,
    pub hand: Hand,
    pub field: Vec<FieldStack>,
    pub foundation: Foundation,
    rules: Rules,
    total_cards: usize,
}

impl Game {
    /// Shuffles a copy of the input and deals it out: pile `i` receives
    /// `i + 1` cards (fewer if the deck runs short), all face-down but the
    /// last, then the hand performs its first draw.
    pub fn deal<R: Rng + ?Sized>(
        data: &[Card],
        rules: &Rules,
        rng: &mut R,
    ) -> Result<Self, StackError> {
        let mut deck = Deck::new(data);
        deck.shuffle(rng);

        let mut field: Vec<FieldStack> = (0..rules.field_stacks)
            .map(|_| FieldStack::default())
            .collect();
        for (i, stack) in field.iter_mut().enumerate() {
            let batch = (i + 1).min(deck.num_cards());
            if batch == 0 {
                break;
            }
            let cards = deck.pull_from_top(batch)?;
            stack.deal(&cards)?;
        }

        let mut hand = Hand::new(rules.hand_size_max, rules.hand_access);
        hand.draw(&mut deck)?;

        Ok(Self {
            deck,
            hand,
            field,
            foundation: Foundation::default(),
            rules: *rules,
            total_cards: data.len(),
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn total_cards(&self) -> usize {
        self.total_cards
    }

    pub fn is_won(&self) -> bool {
        self.foundation.num_cards() == self.total_cards
    }

    /// The smallest card not yet on the foundation, which is the only card
    /// the foundation may legally receive next. `None` once the game is won.
    pub fn next_needed(&self) -> Option<Card> {
        let field_cards = self.field.iter().flat_map(|s| s.cards().iter());
        self.deck
            .cards()
            .iter()
            .chain(self.hand.cards().iter())
            .chain(field_cards)
            .copied()
            .filter(|&card| self.foundation.accepts(card))
            .min()
    }

    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        let join = |cards: &[Card]| cards.iter().map(|c| c.as_char()).collect::<String>();

        if !self.deck.is_empty() {
            output.push_str(&format!("Deck: {}\n", join(self.deck.cards())));
        }
        if !self.hand.is_empty() {
            output.push_str(&format!("Hand: {}\n", join(self.hand.cards())));
        }
        for (i, stack) in self.field.iter().enumerate() {
            if stack.is_empty() {
                continue;
            }
            let down = &stack.cards()[..stack.face_down()];
            output.push_str(&format!(
                "Field{}: {}|{}\n",
                i + 1,
                join(down),
                join(stack.face_up_cards())
            ));
        }
        output.push_str(&format!("Foundation: {}", join(self.foundation.cards())));
        output
    }
}
