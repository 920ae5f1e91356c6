// Two security tiers: public token acquisition, then JWT-protected API
pub mod protected;
pub mod public;
