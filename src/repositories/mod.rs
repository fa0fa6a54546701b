// Repositories module - data access layer

pub mod pet_repository;


pub use pet_repository::{read_pets, write_pets, JsonFilePetRepository, PetRepository};
