// Application layer (usecases)
// Orchestrates domain objects and repository ports

pub mod template_service;

pub use template_service::{
    CreateTemplateInput, CreateVersionInput, TemplateDetails, TemplatePage, TemplateService,
};
