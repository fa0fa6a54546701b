// Services module - business logic layer

pub mod pet_service;

pub use pet_service::PetService;
