pub mod chunk;
pub mod io;
pub mod scene;
pub mod settings;
pub mod util;
