pub mod assets;
pub mod quotation_store;
pub mod reservation;

pub use assets::AssetRegistry;
pub use quotation_store::{QuotationStore, ResolvedOffer};
pub use reservation::{Reservation, ReservationManager};
