pub mod compressed;
pub mod loader;
pub mod sniff;
pub mod wav;

pub use loader::AudioLoader;
pub use sniff::FileKind;
