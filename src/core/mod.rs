pub mod artwork;
pub mod cropper;
pub mod tagger;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod fixtures;
