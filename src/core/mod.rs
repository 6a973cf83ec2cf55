pub mod clock;
pub mod controller;
pub mod display_context;
pub mod gpu_context;
pub mod input_adapter;
pub mod render_loop;
pub mod surface;
pub mod surface_renderer;
pub mod timer;

pub use clock::{FrameClock, ManualClock, SystemClock, TimeSource};
pub use controller::{InputEvent, KeyCommand, PointerId};
pub use display_context::DisplayContext;
pub use gpu_context::GpuContext;
pub use input_adapter::WinitInputAdapter;
pub use render_loop::{FrameInput, FrameOutcome, FrameScheduler, RenderLoop};
pub use surface::{RasterSurface, RasterView, SoftwareSurface};
pub use surface_renderer::WindowPresenter;
pub use timer::{FixedHz, Interval};
