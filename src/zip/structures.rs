/// Record signatures from the ZIP APPNOTE, as little-endian `u32` values.
pub mod signature {
    pub const LOCAL_FILE_HEADER: u32 = 0x04034b50;
    pub const DATA_DESCRIPTOR: u32 = 0x08074b50;
    pub const CENTRAL_FILE_HEADER: u32 = 0x02014b50;
    pub const ZIP64_END_OF_CD: u32 = 0x06064b50;
    pub const ZIP64_END_OF_CD_LOCATOR: u32 = 0x07064b50;
    pub const END_OF_CENTRAL_DIRECTORY: u32 = 0x06054b50;
}

/// Version made by / needed to extract for zip64 records.
pub const ZIP64_MINIMUM_VERSION: u16 = 45;

/// Version needed to extract for plain 32-bit entries.
pub const ZIP32_DEFAULT_VERSION: u16 = 20;

/// Header ID of the zip64 extended information extra field.
pub const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Store,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Store => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Central directory entry with zip64 values resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_method_round_trips_unknown() {
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(93).as_u16(), 93);
    }

    #[test]
    fn test_dos_timestamp() {
        let entry = ZipEntry {
            file_name: "a.txt".to_string(),
            compression_method: CompressionMethod::Store,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            // 2024-03-17 13:45:30
            last_mod_date: ((2024 - 1980) << 9) | (3 << 5) | 17,
            last_mod_time: (13 << 11) | (45 << 5) | 15,
            is_directory: false,
        };

        assert_eq!(entry.mod_date(), (2024, 3, 17));
        assert_eq!(entry.mod_time(), (13, 45, 30));
    }
}
