/// Outcome of asking the rotator for the next player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Next(usize),
    AllEliminated,
}

/// Finds the next active player after `current`, scanning circularly in
/// seating order. `None` starts the scan at index 0. The scan ends on
/// `current` itself, so a sole survivor keeps the turn.
pub fn next_active(current: Option<usize>, active: &[bool]) -> Turn {
    let count = active.len();
    let start = current.map_or(0, |c| c + 1);

    (0..count)
        .map(|offset| (start + offset) % count)
        .find(|&idx| active[idx])
        .map_or(Turn::AllEliminated, Turn::Next)
}

/// Round-robin turn rotation over a fixed seating order.
///
/// Once every player is eliminated the rotator is finished and keeps
/// answering [`Turn::AllEliminated`].
#[derive(Debug, Clone, Default)]
pub struct TurnRotator {
    current: Option<usize>,
    finished: bool,
}

impl TurnRotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn advance(&mut self, active: &[bool]) -> Turn {
        if self.finished {
            return Turn::AllEliminated;
        }

        let turn = next_active(self.current, active);
        match turn {
            Turn::Next(idx) => self.current = Some(idx),
            Turn::AllEliminated => self.finished = true,
        }
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_starts_at_zero() {
        assert_eq!(next_active(None, &[true, true, true]), Turn::Next(0));
        assert_eq!(next_active(None, &[false, true, true]), Turn::Next(1));
    }

    #[test]
    fn test_rotation_is_circular() {
        let active = [true, true, true];
        assert_eq!(next_active(Some(0), &active), Turn::Next(1));
        assert_eq!(next_active(Some(1), &active), Turn::Next(2));
        assert_eq!(next_active(Some(2), &active), Turn::Next(0));
    }

    #[test]
    fn test_skips_inactive_players() {
        assert_eq!(next_active(Some(0), &[true, false, true]), Turn::Next(2));
        assert_eq!(next_active(Some(2), &[false, true, false, false]), Turn::Next(1));
    }

    #[test]
    fn test_sole_survivor_keeps_turn() {
        let active = [false, true, false];
        assert_eq!(next_active(Some(0), &active), Turn::Next(1));
        assert_eq!(next_active(Some(1), &active), Turn::Next(1));
    }

    #[test]
    fn test_all_eliminated() {
        assert_eq!(next_active(Some(1), &[false, false, false]), Turn::AllEliminated);
        assert_eq!(next_active(None, &[false, false]), Turn::AllEliminated);
        assert_eq!(next_active(None, &[]), Turn::AllEliminated);
    }

    #[test]
    fn test_never_selects_inactive() {
        // every activity pattern for four players, from every cursor
        for mask in 0u8..16 {
            let active: Vec<bool> = (0..4).map(|i| mask & (1 << i) != 0).collect();
            for current in [None, Some(0), Some(1), Some(2), Some(3)] {
                match next_active(current, &active) {
                    Turn::Next(idx) => assert!(active[idx]),
                    Turn::AllEliminated => assert!(active.iter().all(|a| !a)),
                }
            }
        }
    }

    #[test]
    fn test_three_player_elimination_scenario() {
        let mut rotator = TurnRotator::new();
        let mut active = vec![true, true, true];

        assert_eq!(rotator.advance(&active), Turn::Next(0));
        active[0] = false;
        assert_eq!(rotator.advance(&active), Turn::Next(1));
        assert_eq!(rotator.advance(&active), Turn::Next(2));
        active[2] = false;
        assert_eq!(rotator.advance(&active), Turn::Next(1));
        assert_eq!(rotator.advance(&active), Turn::Next(1));
        active[1] = false;

        assert_eq!(rotator.advance(&active), Turn::AllEliminated);
        assert!(rotator.is_finished());
        assert_eq!(rotator.current(), Some(1));
    }

    #[test]
    fn test_finished_rotator_stays_finished() {
        let mut rotator = TurnRotator::new();
        assert_eq!(rotator.advance(&[false, false]), Turn::AllEliminated);
        assert_eq!(rotator.advance(&[true, true]), Turn::AllEliminated);
    }
}
