// Export modules for use in tests and embedding hosts
pub mod clock;
pub mod conveyor;
pub mod error;
pub mod events;
pub mod headless_surface;
pub mod pagination;
pub mod position;
pub mod settings;
pub mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use conveyor::{
    ContentSupply, Conveyor, ConveyorOptions, ConveyorTurn, DirectorySupply,
    HeadlessSurfaceFactory, InMemorySupply, Phase, ShiftOutcome, Window, WindowDefaults,
};
pub use error::{ConveyorError, PaginationError, SupplyError, SurfaceError};
pub use events::{EventBus, ReaderEvent, ReaderEventKind};
pub use headless_surface::HeadlessSurface;
pub use pagination::{Direction, PaginationSession, SessionConfig, SessionState};
pub use position::ReadingPosition;
pub use settings::Settings;
pub use surface::DocumentSurface;
