// Partition types

use gpt_disk_types::GptPartitionType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionType {
    /// Holds the FAT32 ESP
    EfiSystem,
    /// Microsoft Basic Data, holds the ISO9660 volume
    BasicData,
}

impl PartitionType {
    pub fn type_name(&self) -> &'static str {
        match self {
            PartitionType::EfiSystem => "EFI System",
            PartitionType::BasicData => "Basic Data",
        }
    }

    /// Convert from gpt_disk_types GUID to PartitionType
    pub fn from_gpt_guid(guid: &GptPartitionType) -> Option<Self> {
        if guid == &GptPartitionType::EFI_SYSTEM {
            Some(PartitionType::EfiSystem)
        } else if guid == &GptPartitionType::BASIC_DATA {
            Some(PartitionType::BasicData)
        } else {
            None
        }
    }

    /// Convert to gpt_disk_types GUID
    pub fn to_gpt_guid(&self) -> GptPartitionType {
        match self {
            PartitionType::EfiSystem => GptPartitionType::EFI_SYSTEM,
            PartitionType::BasicData => GptPartitionType::BASIC_DATA,
        }
    }
}
