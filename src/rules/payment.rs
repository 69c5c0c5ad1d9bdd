//! Resource affordability and payment.
//!
//! A cost is affordable when, for each colored requirement, enough unspent
//! resources of that color exist, and the total unspent count covers the
//! whole cost. Payment spends colored matches first, in requirement order,
//! then any unspent resources for the generic part. Within a color the
//! earliest-played resources are spent first.

use crate::cards::CostRequirement;
use crate::core::PlayerState;

/// Whether `player` can pay `cost` right now.
#[must_use]
pub fn can_afford(cost: &CostRequirement, player: &PlayerState) -> bool {
    let untapped: Vec<_> = player.untapped_resources().collect();
    let colors_met = cost
        .colored
        .iter()
        .all(|(color, needed)| untapped.iter().filter(|r| r.color == *color).count() >= *needed as usize);
    colors_met && untapped.len() >= cost.total() as usize
}

/// Spend resources for `cost`. Returns how many were spent.
///
/// Callers check `can_afford` first; an unaffordable cost spends as much
/// as it can.
pub fn pay_cost(cost: &CostRequirement, player: &mut PlayerState) -> u32 {
    let mut spent = 0;
    for (color, needed) in &cost.colored {
        let mut remaining = *needed;
        for resource in player.resources.iter_mut() {
            if remaining == 0 {
                break;
            }
            if !resource.is_spent && resource.color == *color {
                resource.is_spent = true;
                remaining -= 1;
                spent += 1;
            }
        }
    }

    let mut generic = cost.generic;
    for resource in player.resources.iter_mut() {
        if generic == 0 {
            break;
        }
        if !resource.is_spent {
            resource.is_spent = true;
            generic -= 1;
            spent += 1;
        }
    }
    spent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{parse_cost, CardDefinition, CardInstance, CardType, Color};
    use crate::core::{InstanceId, ResourceToken};

    fn player_with(colors: &[Color]) -> PlayerState {
        let mut player = PlayerState::default();
        for (i, color) in colors.iter().enumerate() {
            let card = CardDefinition::new("R", "Resource", CardType::Tool);
            player.resources.push_back(ResourceToken {
                color: *color,
                is_spent: false,
                card: CardInstance::new(InstanceId::new(i as u32 + 1), card),
            });
        }
        player
    }

    #[test]
    fn test_affordability() {
        let player = player_with(&[Color::Orange, Color::Green, Color::Green]);
        assert!(can_afford(&parse_cost("(1)(G)(G)"), &player));
        assert!(can_afford(&parse_cost("(O)(1)"), &player));
        assert!(!can_afford(&parse_cost("(O)(O)"), &player));
        assert!(!can_afford(&parse_cost("(3)(G)"), &player));
        assert!(can_afford(&parse_cost(""), &PlayerState::default()));
    }

    #[test]
    fn test_spent_resources_do_not_count() {
        let mut player = player_with(&[Color::Blue, Color::Blue]);
        player.resources[0].is_spent = true;
        assert!(!can_afford(&parse_cost("(B)(B)"), &player));
        assert!(can_afford(&parse_cost("(B)"), &player));
    }

    #[test]
    fn test_pay_colored_first() {
        let mut player = player_with(&[Color::Green, Color::Orange, Color::Orange]);
        let cost = parse_cost("(1)(O)");

        assert_eq!(pay_cost(&cost, &mut player), 2);
        // Orange requirement takes the first orange; generic takes the first unspent (green).
        assert!(player.resources[0].is_spent);
        assert!(player.resources[1].is_spent);
        assert!(!player.resources[2].is_spent);
    }

    #[test]
    fn test_pay_spends_exact_total() {
        let mut player = player_with(&[Color::Purple, Color::Black, Color::Purple, Color::Green, Color::Blue]);
        let cost = parse_cost("(2)(P)(Bk)");
        assert!(can_afford(&cost, &player));

        let spent = pay_cost(&cost, &mut player);
        assert_eq!(spent, cost.total());
        assert_eq!(player.untapped_resources().count(), 1);
    }
}
