//! Card system: definitions, instances, registry and the string grammars.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card definitions
//! - `CardType`: Pupil, Interruption, Tool or Location
//! - `CardDefinition`: Static card data with structured `Abilities`
//! - `CardInstance`: Runtime card state (endurance, spent, getting bearings)
//! - `CardRegistry`: Card definition lookup, loaded from card data JSON
//! - `CostRequirement` / `Color`: parsed cost strings
//! - `DiceExpr`: parsed dice strings

pub mod ability;
pub mod cost;
pub mod definition;
pub mod dice;
pub mod instance;
pub mod registry;

pub use ability::{Abilities, Effect, Keyword, KeywordSet};
pub use cost::{parse_cost, primary_color, Color, CostRequirement};
pub use definition::{CardDefinition, CardId, CardType, Rarity};
pub use dice::{expected_roll, roll_dice, DiceExpr};
pub use instance::CardInstance;
pub use registry::CardRegistry;
