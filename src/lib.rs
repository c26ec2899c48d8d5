mod spoilers;
pub use spoilers::SpoilersHandler;

pub mod landing_gear;
pub mod simulation;
