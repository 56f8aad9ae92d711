pub mod pet;
