// fixed.rs — 16.16 fixed-point math and binary angles
//
// All positions and velocities are `Fixed`. The upper 16 bits of an x/y
// coordinate are the tile index, the lower 16 the position inside the tile.

use std::sync::OnceLock;

pub type Fixed = i32;
pub type Angle = u32;

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: Fixed = 1 << FRACBITS;

pub const TILESHIFT: i32 = 16;
pub const TILEGLOBAL: Fixed = 1 << TILESHIFT;
pub const TILEMASK: Fixed = !(TILEGLOBAL - 1);

pub const ANGLE_45: Angle = 0x2000_0000;
pub const ANGLE_90: Angle = ANGLE_45 * 2;
pub const ANGLE_180: Angle = ANGLE_45 * 4;
pub const ANGLE_1: Angle = ANGLE_45 / 45;

pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;
pub const ANGLETOFINESHIFT: u32 = 19;

/// Simulation rate in tics per second.
pub const TICRATE: u32 = 70;

#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    ((a as i64 * b as i64) >> FRACBITS) as Fixed
}

/// Fixed division. Division by zero saturates toward the sign of `a`.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return if a < 0 { Fixed::MIN } else { Fixed::MAX };
    }
    (((a as i64) << FRACBITS) / b as i64).clamp(Fixed::MIN as i64, Fixed::MAX as i64) as Fixed
}

#[inline]
pub fn float_to_fixed(f: f64) -> Fixed {
    (f * FRACUNIT as f64) as Fixed
}

#[inline]
pub fn fixed_to_float(f: Fixed) -> f64 {
    f as f64 / FRACUNIT as f64
}

/// Tile index of a coordinate (the high word).
#[inline]
pub fn tile_of(v: Fixed) -> u16 {
    (v >> TILESHIFT) as u16
}

/// Position inside the tile (the low word).
#[inline]
pub fn frac_of(v: Fixed) -> u16 {
    (v & 0xffff) as u16
}

/// Centre of the tile containing `v`.
#[inline]
pub fn tile_center(v: Fixed) -> Fixed {
    (v & TILEMASK) + TILEGLOBAL / 2
}

#[inline]
pub fn angle_to_fine(a: Angle) -> usize {
    (a >> ANGLETOFINESHIFT) as usize
}

fn sine_table() -> &'static [Fixed] {
    static TABLE: OnceLock<Box<[Fixed]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..FINEANGLES)
            .map(|i| {
                let a = (i as f64 + 0.5) * std::f64::consts::TAU / FINEANGLES as f64;
                float_to_fixed(a.sin())
            })
            .collect()
    })
}

/// Sine of a fine angle index (wraps).
pub fn fine_sine(fine: usize) -> Fixed {
    sine_table()[fine & FINEMASK]
}

/// Cosine of a fine angle index (wraps).
pub fn fine_cosine(fine: usize) -> Fixed {
    sine_table()[(fine + FINEANGLES / 4) & FINEMASK]
}
