//! Byk server - restaurant table booking and order fulfillment core
//!
//! # Structure
//!
//! ```text
//! byk-server/src/
//! ├── core/          # config, state, server, error taxonomy
//! ├── cart/          # session cart aggregate
//! ├── reservations/  # availability engine + reservation lifecycle
//! ├── orders/        # checkout + order lifecycle
//! ├── storage.rs     # redb tables
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # envelope helpers, logger, clock
//! ```

pub mod api;
pub mod cart;
pub mod core;
pub mod orders;
pub mod reservations;
pub mod storage;
pub mod utils;

pub use core::{BookingError, BookingResult, Config, Server, ServerState};
pub use orders::OrdersManager;
pub use reservations::{AvailabilityEngine, ReservationsManager};
pub use storage::BookingStorage;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____        __
   / __ )__  __/ /__
  / __  / / / / //_/
 / /_/ / /_/ / ,<
/_____/\__, /_/|_|
      /____/
    "#
    );
}
