// Editor module for the sketch studio.

pub mod canvas;
pub mod compositor;
pub mod error;
pub mod export;
pub mod history;
pub mod loader;
pub mod session;
pub mod stroke;
pub mod template;
pub mod text;
pub mod tools;
pub mod view;

pub use canvas::Canvas;
pub use compositor::PlaceMode;
pub use error::{CompositeError, EditorError, ExportError};
pub use history::{History, HistoryEntry};
pub use loader::{ImageLoader, ImageSource, LoadTicket, PendingImage};
pub use session::{EditorSession, OverlayRequest};
pub use stroke::{DrawingSurface, EventResponse, PointerKind};
pub use template::{Template, TemplateCatalog};
pub use text::{FontBook, FontWeight, TextAlign, TextStyle};
pub use tools::{Brush, Eraser, Tool, ToolKind};
pub use view::ViewTransform;

// Future modules
// pub mod layers;
// pub mod symmetry;
