/// Image codec, resize and transform modules for pixbot.

pub mod codec;
pub mod resize;
pub mod transform;
