pub mod fft;
pub mod framing;
pub mod mfcc;
pub mod normalize;
