//! [`Command`] definition.

pub mod authorize_agent;
pub mod authorize_user_session;
pub mod create_company;
pub mod create_property;
pub mod create_user_session;
pub mod delete_property;
pub mod delete_property_image;
pub mod get_or_create_company;
pub mod mark_inquiry_responded;
pub mod register_agent;
pub mod submit_inquiry;
pub mod update_property;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_agent::AuthorizeAgent,
    authorize_user_session::AuthorizeUserSession,
    create_company::CreateCompany, create_property::CreateProperty,
    create_user_session::CreateUserSession, delete_property::DeleteProperty,
    delete_property_image::DeletePropertyImage,
    get_or_create_company::GetOrCreateCompany,
    mark_inquiry_responded::MarkInquiryResponded,
    register_agent::RegisterAgent, submit_inquiry::SubmitInquiry,
    update_property::UpdateProperty,
};
