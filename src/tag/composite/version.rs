use std::{
    fmt,
    io::{Read, Write},
};

use tagwire_error::TagResult;

use crate::{
    codec::{DeclaredSize, ReadBytes, StandardTag, WriteBytes},
    tag::{Payload, StandardPayload, TagFactory},
};

/// Версия `major.minor.patch.build`, ровно 16 байт на проводе.
///
/// Порядок лексикографический по компонентам.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub build: i32,
}

impl Version {
    pub const fn new(
        major: i32,
        minor: i32,
        patch: i32,
        build: i32,
    ) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}

impl Payload for Version {
    fn value_size(&self) -> u64 {
        16
    }

    fn serialize_value(
        &self,
        w: &mut dyn Write,
    ) -> TagResult<()> {
        w.write_i32(self.major)?;
        w.write_i32(self.minor)?;
        w.write_i32(self.patch)?;
        w.write_i32(self.build)
    }

    fn deserialize_value(
        &mut self,
        _factory: &TagFactory,
        size: DeclaredSize,
        r: &mut dyn Read,
    ) -> TagResult<()> {
        size.require_exact(16, "version")?;
        *self = Self {
            major: r.read_i32()?,
            minor: r.read_i32()?,
            patch: r.read_i32()?,
            build: r.read_i32()?,
        };
        Ok(())
    }
}

impl StandardPayload for Version {
    const TAG: StandardTag = StandardTag::Version;
}
