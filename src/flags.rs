use super::Word;

pub const FLAG_SIGN: Word = 1 << 0;
pub const FLAG_ZERO: Word = 1 << 1;
pub const FLAG_OVERFLOW: Word = 1 << 2;
pub const FLAG_CARRY: Word = 1 << 3;
pub const FLAG_BITS: Word = 0x000F;

/// Condition flags of the processor.
///
/// `SAVEF`/`RSTRF` and the `FON`/`FOFF`/`FSET5`/`FSET4` mask operations view
/// the flags as a word with `sign` in bit 0, `zero` in bit 1, `overflow` in
/// bit 2 and `carry` in bit 3. Bit 4 of five-bit masks is reserved and
/// ignored.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags {
    pub sign: bool,
    pub zero: bool,
    pub overflow: bool,
    pub carry: bool,
}

impl Flags {
    pub fn bits(self) -> Word {
        let mut word = 0;
        if self.sign {
            word |= FLAG_SIGN;
        }
        if self.zero {
            word |= FLAG_ZERO;
        }
        if self.overflow {
            word |= FLAG_OVERFLOW;
        }
        if self.carry {
            word |= FLAG_CARRY;
        }
        word
    }

    pub fn from_bits(word: Word) -> Flags {
        Flags {
            sign: word & FLAG_SIGN != 0,
            zero: word & FLAG_ZERO != 0,
            overflow: word & FLAG_OVERFLOW != 0,
            carry: word & FLAG_CARRY != 0,
        }
    }

    /// Turns on every flag present in `mask`.
    pub fn set_masked(&mut self, mask: Word) {
        *self = Flags::from_bits(self.bits() | mask);
    }

    /// Turns off every flag present in `mask`.
    pub fn clear_masked(&mut self, mask: Word) {
        *self = Flags::from_bits(self.bits() & !mask);
    }

    /// Replaces the flags with `mask`.
    pub fn load_masked(&mut self, mask: Word) {
        *self = Flags::from_bits(mask);
    }

    pub fn get(self, name: &str) -> Option<bool> {
        match canonical_flag(name)? {
            FLAG_SIGN => Some(self.sign),
            FLAG_ZERO => Some(self.zero),
            FLAG_OVERFLOW => Some(self.overflow),
            _ => Some(self.carry),
        }
    }

    pub fn set(&mut self, name: &str, value: bool) -> bool {
        match canonical_flag(name) {
            Some(FLAG_SIGN) => self.sign = value,
            Some(FLAG_ZERO) => self.zero = value,
            Some(FLAG_OVERFLOW) => self.overflow = value,
            Some(FLAG_CARRY) => self.carry = value,
            _ => return false,
        }
        true
    }
}

fn canonical_flag(name: &str) -> Option<Word> {
    match name {
        "s" | "sign" => Some(FLAG_SIGN),
        "z" | "zero" => Some(FLAG_ZERO),
        "v" | "overflow" => Some(FLAG_OVERFLOW),
        "c" | "carry" => Some(FLAG_CARRY),
        _ => None,
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "sign={} zero={} overflow={} carry={}",
            self.sign as u8, self.zero as u8, self.overflow as u8, self.carry as u8
        )
    }
}
