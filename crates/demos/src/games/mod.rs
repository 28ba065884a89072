mod art;
mod platformer;
mod simple;
mod space;
mod util;

pub(crate) use art::ArtSource;
pub(crate) use platformer::Platformer;
pub(crate) use simple::Simple;
pub(crate) use space::Space;
