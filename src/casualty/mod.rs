//! Casualty selection: which units are lost when a round produces hits
//!
//! The [`ranker`] orders (owner, type) groups by how much they contribute,
//! support network included; [`refinement`] picks individuals within a group;
//! [`selection`] ties both together for one round of hits.

pub mod groups;
pub mod ranker;
pub mod refinement;
pub mod selection;

pub use groups::{
    GroupArena, GroupId, GroupValuation, SupportDirection, SupportEdge, UnitGroup,
    UnsupportedStacking,
};
pub use ranker::{CasualtyRanker, Pick};
pub use refinement::{choose_kills, distribute_damage, order_candidates, refine_casualty_list, Fate};
pub use selection::{hit_capacity, select_casualties, CasualtyContext, CasualtyList};
