mod expect;
mod launch;
mod stop;
mod write_input;

pub use expect::Expect;
pub use launch::Launch;
pub use stop::Stop;
pub use write_input::WriteInput;
