mod raw;
mod record;

pub use self::raw::{RawPackage, RawResource};
pub use self::record::{Images, License, PackageRecord};
