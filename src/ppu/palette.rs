//! 2C02 system palette.

/// 64-entry NTSC palette as packed RGBA (0xRRGGBBAA). Index with a 6-bit palette RAM value.
pub const SYSTEM_PALETTE: [u32; 64] = [
    0x545454FF, 0x001E74FF, 0x081090FF, 0x300088FF, 0x440064FF, 0x5C0030FF, 0x540400FF, 0x3C1800FF,
    0x202A00FF, 0x083A00FF, 0x004000FF, 0x003C00FF, 0x00302CFF, 0x000000FF, 0x000000FF, 0x000000FF,
    0x989698FF, 0x084CC4FF, 0x3032ECFF, 0x5C1EE4FF, 0x8814B0FF, 0xA01464FF, 0x982220FF, 0x783C00FF,
    0x545A00FF, 0x287200FF, 0x087C00FF, 0x007628FF, 0x006678FF, 0x000000FF, 0x000000FF, 0x000000FF,
    0xECEEECFF, 0x3C7EECFF, 0x5C5CECFF, 0x8844ECFF, 0xB02CECFF, 0xE028B0FF, 0xD83C50FF, 0xC45400FF,
    0xAC7000FF, 0x808800FF, 0x409C30FF, 0x20A458FF, 0x209A88FF, 0x404040FF, 0x000000FF, 0x000000FF,
    0xECEEECFF, 0xA8BCECFF, 0xBCACECFF, 0xD4A0ECFF, 0xEC94ECFF, 0xEC90D4FF, 0xEC9CB4FF, 0xE4B090FF,
    0xDCC878FF, 0xD4DC78FF, 0xB8EC98FF, 0xA8ECBCFF, 0xA0E4E4FF, 0xA0A0A0FF, 0x000000FF, 0x000000FF,
];

/// Convert a packed RGBA colour to the 0x00RRGGBB layout most window toolkits expect.
pub fn rgba_to_rgb(color: u32) -> u32 {
    color >> 8
}
