use log::warn;
use rand::Rng;
use smallvec::SmallVec;

use crate::card::{Card, stackable};
use crate::error::StackError;
use crate::rules::HandAccess;

pub type Cards = SmallVec<[Card; 16]>;

/// What sits on top of a stack. A non-empty stack whose top is face-down is
/// present but opaque, which is distinct from both other answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopCard {
    Empty,
    Hidden,
    Up(Card),
}

/// An ordered pile of cards partitioned into a face-down bottom and a
/// face-up top. The back of the sequence is the top. Invariant after every
/// operation: `0 <= face_up <= len`.
#[derive(Debug, Clone, Default)]
pub struct CardStack {
    cards: Cards,
    face_up: usize,
}

impl CardStack {
    pub fn num_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn face_up(&self) -> usize {
        self.face_up
    }

    pub fn face_down(&self) -> usize {
        self.cards.len() - self.face_up
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn face_up_cards(&self) -> &[Card] {
        &self.cards[self.cards.len() - self.face_up..]
    }

    pub fn top_card(&self) -> TopCard {
        match self.cards.last() {
            None => TopCard::Empty,
            Some(&card) if self.face_up > 0 => TopCard::Up(card),
            Some(_) => TopCard::Hidden,
        }
    }

    /// Appends cards to the top; they arrive face-up. Pushing nothing is
    /// reported and ignored rather than treated as a failure.
    pub fn push_to_top(&mut self, cards: &[Card]) {
        if cards.is_empty() {
            warn!("push of zero cards ignored");
            return;
        }
        self.cards.extend_from_slice(cards);
        self.face_up += cards.len();
    }

    /// Prepends cards to the bottom; they arrive face-down.
    pub fn push_to_bottom(&mut self, cards: &[Card]) {
        self.cards.insert_from_slice(0, cards);
    }

    /// Removes and returns the top `n` cards, which must all be face-up.
    pub fn pull_from_top(&mut self, n: usize) -> Result<Cards, StackError> {
        if n > self.face_up {
            return Err(StackError::Capacity {
                requested: n,
                available: self.face_up,
            });
        }
        let pulled = self.cards.drain(self.cards.len() - n..).collect();
        self.face_up -= n;
        Ok(pulled)
    }

    /// Removes the top `n` cards regardless of visibility. Queue-style
    /// stacks (the deck) keep everything face-down and pull through this.
    pub fn pull_from_top_hidden(&mut self, n: usize) -> Result<Cards, StackError> {
        if n > self.cards.len() {
            return Err(StackError::Capacity {
                requested: n,
                available: self.cards.len(),
            });
        }
        let pulled = self.cards.drain(self.cards.len() - n..).collect();
        self.face_up = self.face_up.min(self.cards.len());
        Ok(pulled)
    }

    pub fn reveal(&mut self, n: usize) -> Result<(), StackError> {
        let hidden = self.face_down();
        if n > hidden {
            return Err(StackError::Capacity {
                requested: n,
                available: hidden,
            });
        }
        self.face_up += n;
        Ok(())
    }

    pub fn conceal(&mut self, n: usize) -> Result<(), StackError> {
        if n > self.face_up {
            return Err(StackError::Capacity {
                requested: n,
                available: self.face_up,
            });
        }
        self.face_up -= n;
        Ok(())
    }
}

/// Moves the top `n` face-up cards of `src` onto `dest`, preserving their
/// order. A zero-card transfer is a no-op.
pub fn transfer(src: &mut CardStack, dest: &mut CardStack, n: usize) -> Result<(), StackError> {
    if n == 0 {
        return Ok(());
    }
    let cards = src.pull_from_top(n)?;
    dest.push_to_top(&cards);
    Ok(())
}

/// The draw pile: a FIFO queue of face-down cards. Cards leave from the
/// top and returned cards go back underneath.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    stack: CardStack,
}

impl Deck {
    pub fn new(cards: &[Card]) -> Self {
        let mut stack = CardStack::default();
        stack.push_to_bottom(cards);
        Self { stack }
    }

    pub fn num_cards(&self) -> usize {
        self.stack.num_cards()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        self.stack.cards()
    }

    pub fn push_to_bottom(&mut self, cards: &[Card]) {
        self.stack.push_to_bottom(cards);
    }

    pub fn pull_from_top(&mut self, n: usize) -> Result<Cards, StackError> {
        self.stack.pull_from_top_hidden(n)
    }

    /// Unbiased in-place Fisher-Yates permutation.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let cards = &mut self.stack.cards;
        for i in (1..cards.len()).rev() {
            let j = rng.random_range(0..=i);
            cards.swap(i, j);
        }
    }
}

/// The bounded hand. Everything in it is face-up; whether any card or only
/// the most recently drawn one may leave is fixed at construction.
#[derive(Debug, Clone)]
pub struct Hand {
    cards: Cards,
    capacity: usize,
    access: HandAccess,
}

impl Hand {
    pub fn new(capacity: usize, access: HandAccess) -> Self {
        Self {
            cards: Cards::new(),
            capacity,
            access,
        }
    }

    pub fn num_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn peek(&self, index: usize) -> Option<Card> {
        self.cards.get(index).copied()
    }

    pub fn access(&self) -> HandAccess {
        self.access
    }

    /// Indices the engine may legally remove from, given the access mode.
    pub fn reachable_indices(&self) -> std::ops::Range<usize> {
        match self.access {
            HandAccess::RandomAccess => 0..self.cards.len(),
            HandAccess::TopOnly => self.cards.len().saturating_sub(1)..self.cards.len(),
        }
    }

    /// Returns the current contents to the bottom of the deck, then refills
    /// from the deck's top with up to `capacity` cards.
    pub fn draw(&mut self, deck: &mut Deck) -> Result<(), StackError> {
        deck.push_to_bottom(&self.cards);
        self.cards.clear();
        let n = self.capacity.min(deck.num_cards());
        self.cards = deck.pull_from_top(n)?;
        if self.cards.len() > self.capacity {
            return Err(StackError::Capacity {
                requested: self.cards.len(),
                available: self.capacity,
            });
        }
        Ok(())
    }

    /// Removes the card at `index`. Under top-only access any other index
    /// is reported and refused, not an invariant breach.
    pub fn take(&mut self, index: usize) -> Option<Card> {
        if index >= self.cards.len() {
            return None;
        }
        if self.access == HandAccess::TopOnly && index != self.cards.len() - 1 {
            warn!("hand index {index} refused under top-only access");
            return None;
        }
        Some(self.cards.remove(index))
    }
}

/// A working pile. Face-down cards from the deal sit underneath; the
/// face-up portion builds ascending runs.
#[derive(Debug, Clone, Default)]
pub struct FieldStack {
    stack: CardStack,
}

impl FieldStack {
    /// Receives one dealt batch: all face-down except the last card.
    pub fn deal(&mut self, cards: &[Card]) -> Result<(), StackError> {
        if cards.is_empty() {
            return Ok(());
        }
        self.stack.push_to_top(cards);
        self.stack.conceal(cards.len() - 1)
    }

    pub fn num_cards(&self) -> usize {
        self.stack.num_cards()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn face_up(&self) -> usize {
        self.stack.face_up()
    }

    pub fn face_down(&self) -> usize {
        self.stack.face_down()
    }

    pub fn cards(&self) -> &[Card] {
        self.stack.cards()
    }

    pub fn face_up_cards(&self) -> &[Card] {
        self.stack.face_up_cards()
    }

    pub fn top_card(&self) -> TopCard {
        self.stack.top_card()
    }

    /// Length of the moveable run: the longest face-up suffix whose
    /// adjacent cards are rank-adjacent ascending. A lone face-up card is
    /// its own run of 1.
    pub fn moveable_len(&self) -> usize {
        let up = self.stack.face_up_cards();
        if up.is_empty() {
            return 0;
        }
        let mut len = 1;
        while len < up.len() && stackable(up[up.len() - len - 1], up[up.len() - len]) {
            len += 1;
        }
        len
    }

    /// The moveable run, bottom-to-top.
    pub fn moveable_cards(&self) -> &[Card] {
        let up = self.stack.face_up_cards();
        &up[up.len() - self.moveable_len()..]
    }

    pub fn push(&mut self, cards: &[Card]) {
        self.stack.push_to_top(cards);
    }

    /// Pulls the top `n` face-up cards, revealing the next face-down card
    /// if that empties the face-up portion.
    pub fn pull(&mut self, n: usize) -> Result<Cards, StackError> {
        let cards = self.stack.pull_from_top(n)?;
        if self.stack.face_up() == 0 && !self.stack.is_empty() {
            self.stack.reveal(1)?;
        }
        Ok(cards)
    }

    /// Moves the top `n` face-up cards onto another pile, with the same
    /// reveal behavior as `pull`.
    pub fn transfer_to(&mut self, dest: &mut FieldStack, n: usize) -> Result<(), StackError> {
        transfer(&mut self.stack, &mut dest.stack, n)?;
        if self.stack.face_up() == 0 && !self.stack.is_empty() {
            self.stack.reveal(1)?;
        }
        Ok(())
    }
}

/// The sorted output pile. Append-only and strictly increasing; an
/// out-of-order push is a move-engine bug, never a game state.
#[derive(Debug, Clone, Default)]
pub struct Foundation {
    cards: Cards,
}

impl Foundation {
    pub fn num_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    pub fn accepts(&self, card: Card) -> bool {
        match self.top() {
            None => true,
            Some(top) => top < card,
        }
    }

    pub fn push(&mut self, card: Card) -> Result<(), StackError> {
        match self.top() {
            Some(top) if top >= card => Err(StackError::OutOfOrder { card, top }),
            _ => {
                self.cards.push(card);
                Ok(())
            }
        }
    }

    pub fn push_to_top(&mut self, cards: &[Card]) -> Result<(), StackError> {
        if cards.is_empty() {
            warn!("push of zero cards ignored");
            return Ok(());
        }
        for &card in cards {
            self.push(card)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cards(s: &str) -> Vec<Card> {
        Card::parse_all(s).unwrap()
    }

    fn field(face_down: &str, face_up: &str) -> FieldStack {
        let mut stack = FieldStack::default();
        stack.push(&cards(face_down));
        stack.stack.conceal(stack.stack.face_up()).unwrap();
        stack.push(&cards(face_up));
        stack
    }

    #[test]
    fn test_push_pull_keeps_invariant() {
        let mut stack = CardStack::default();
        stack.push_to_top(&cards("345"));
        assert_eq!(stack.num_cards(), 3);
        assert_eq!(stack.face_up(), 3);

        stack.conceal(2).unwrap();
        assert_eq!(stack.face_up(), 1);
        assert_eq!(stack.face_down(), 2);

        let pulled = stack.pull_from_top(1).unwrap();
        assert_eq!(pulled.as_slice(), cards("5").as_slice());
        assert_eq!(stack.face_up(), 0);
        assert!(stack.face_up() <= stack.num_cards());
    }

    #[test]
    fn test_pull_more_than_face_up_is_capacity_violation() {
        let mut stack = CardStack::default();
        stack.push_to_top(&cards("345"));
        stack.conceal(2).unwrap();
        assert_eq!(
            stack.pull_from_top(2),
            Err(StackError::Capacity {
                requested: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_reveal_conceal_bounds() {
        let mut stack = CardStack::default();
        stack.push_to_top(&cards("34"));
        assert!(stack.reveal(1).is_err());
        stack.conceal(2).unwrap();
        assert!(stack.conceal(1).is_err());
        stack.reveal(2).unwrap();
        assert_eq!(stack.face_up(), 2);
    }

    #[test]
    fn test_top_card_is_three_valued() {
        let mut stack = CardStack::default();
        assert_eq!(stack.top_card(), TopCard::Empty);
        stack.push_to_top(&cards("7"));
        assert_eq!(stack.top_card(), TopCard::Up(Card::parse('7').unwrap()));
        stack.conceal(1).unwrap();
        assert_eq!(stack.top_card(), TopCard::Hidden);
    }

    #[test]
    fn test_transfer_zero_is_noop() {
        let mut src = CardStack::default();
        let mut dest = CardStack::default();
        src.push_to_top(&cards("34"));
        transfer(&mut src, &mut dest, 0).unwrap();
        assert_eq!(src.num_cards(), 2);
        assert_eq!(dest.num_cards(), 0);
        transfer(&mut src, &mut dest, 2).unwrap();
        assert_eq!(dest.cards(), cards("34").as_slice());
    }

    #[test]
    fn test_deck_is_fifo() {
        let mut deck = Deck::new(&cards("345"));
        // top of the deck is the back of the sequence
        let first = deck.pull_from_top(1).unwrap();
        assert_eq!(first.as_slice(), cards("5").as_slice());
        deck.push_to_bottom(&first);
        assert_eq!(deck.cards(), cards("534").as_slice());
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let original = cards("A23456789");
        let mut deck = Deck::new(&original);
        let mut rng = StdRng::seed_from_u64(7);
        deck.shuffle(&mut rng);
        let mut shuffled = deck.cards().to_vec();
        shuffled.sort();
        assert_eq!(shuffled, original);
    }

    #[test]
    fn test_hand_draw_cycle_sizes() {
        // Hand of h=2, deck of d=5, capacity 3: after a draw the deck holds
        // d + h - 3 and the hand holds exactly 3.
        let mut deck = Deck::new(&cards("A2345"));
        let mut hand = Hand::new(3, HandAccess::RandomAccess);
        hand.cards.extend_from_slice(&cards("89"));
        hand.draw(&mut deck).unwrap();
        assert_eq!(hand.num_cards(), 3);
        assert_eq!(deck.num_cards(), 4);
    }

    #[test]
    fn test_hand_draw_from_short_deck() {
        let mut deck = Deck::new(&cards("A2"));
        let mut hand = Hand::new(3, HandAccess::RandomAccess);
        hand.draw(&mut deck).unwrap();
        assert_eq!(hand.num_cards(), 2);
        assert!(deck.is_empty());
    }

    #[test]
    fn test_hand_top_only_refuses_inner_index() {
        let mut hand = Hand::new(3, HandAccess::TopOnly);
        hand.cards.extend_from_slice(&cards("357"));
        assert_eq!(hand.reachable_indices(), 2..3);
        assert_eq!(hand.take(0), None);
        assert_eq!(hand.take(2), Some(Card::parse('7').unwrap()));
    }

    #[test]
    fn test_moveable_run_adjacent_ascending() {
        let stack = field("", "345");
        assert_eq!(stack.moveable_len(), 3);
        assert_eq!(stack.moveable_cards(), cards("345").as_slice());
    }

    #[test]
    fn test_moveable_run_stops_at_gap() {
        let stack = field("", "356");
        assert_eq!(stack.moveable_len(), 2);
        assert_eq!(stack.moveable_cards(), cards("56").as_slice());
    }

    #[test]
    fn test_moveable_run_stops_at_face_down_boundary() {
        // 4 and 5 are adjacent but 4 is face-down, so the run is just [5].
        let stack = field("4", "5");
        assert_eq!(stack.moveable_len(), 1);
    }

    #[test]
    fn test_field_pull_reveals_next_card() {
        let mut stack = field("29", "5");
        let pulled = stack.pull(1).unwrap();
        assert_eq!(pulled.as_slice(), cards("5").as_slice());
        assert_eq!(stack.top_card(), TopCard::Up(Card::parse('9').unwrap()));
        assert_eq!(stack.face_down(), 1);
    }

    #[test]
    fn test_field_transfer_reveals_next_card() {
        let mut src = field("9", "45");
        let mut dest = field("", "3");
        src.transfer_to(&mut dest, 2).unwrap();
        assert_eq!(dest.face_up_cards(), cards("345").as_slice());
        assert_eq!(src.top_card(), TopCard::Up(Card::parse('9').unwrap()));
        assert_eq!(src.face_down(), 0);
    }

    #[test]
    fn test_foundation_monotonicity() {
        let mut foundation = Foundation::default();
        foundation.push(Card::parse('2').unwrap()).unwrap();
        foundation.push(Card::parse('3').unwrap()).unwrap();
        let dup = foundation.push(Card::parse('3').unwrap());
        assert!(matches!(dup, Err(StackError::OutOfOrder { .. })));
        let lower = foundation.push(Card::parse('A').unwrap());
        assert!(matches!(lower, Err(StackError::OutOfOrder { .. })));
        assert_eq!(foundation.cards(), cards("23").as_slice());
    }

    #[test]
    fn test_foundation_push_many() {
        let mut foundation = Foundation::default();
        foundation.push_to_top(&cards("259")).unwrap();
        assert!(foundation.push_to_top(&cards("84")).is_err());
    }
}
