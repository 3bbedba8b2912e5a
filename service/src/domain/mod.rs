//! Domain definitions.

pub mod access;
pub mod agent;
pub mod company;
pub mod contact;
pub mod media;
pub mod property;
pub mod user;

pub use self::{
    access::Actor, agent::Agent, company::Company, contact::Contact,
    property::Property, user::User,
};
