// Ban registry domain: append-only blacklist of banned identifiers.
//
// Written exactly once per identifier, at the moment a second expulsion is
// finalized. The registration flow queries it before allowing a signup; a
// hit is a hard rejection.

pub mod actions;
pub mod models;
