//! Parties domain module: the customers and suppliers purchases transact with.

pub mod party;

pub use party::{
    ContactInfo, Party, PartyCommand, PartyEvent, PartyId, PartyKind, PartyRegistered,
    PartyReinstated, PartyStatus, PartySuspended, PartyUpdated, RegisterParty, ReinstateParty,
    SuspendParty, UpdateDetails,
};
