mod detect;
mod resolve;

pub use detect::{DetectIntersections, Intersection};
pub use resolve::{JoineryReport, ResolveJoinery};
