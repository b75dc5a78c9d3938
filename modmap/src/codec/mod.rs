//! Pure value <-> register conversions.
//!
//! Encoding and decoding share one explicit word-order x byte-order
//! matrix for the four float conventions, so `decode(encode(v)) == v`
//! holds bit-exactly for every non-NaN single-precision value.

pub(crate) mod decode;
pub(crate) mod encode;

/// Which 16-bit word carries the most-significant half of a 32-bit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WordOrder {
    HighFirst,
    LowFirst,
}

/// Byte order within each 16-bit word relative to network order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ByteOrder {
    Network,
    Swapped,
}

/// One of the four float wire conventions, as a point on the two axes.
///
/// For an IEEE-754 single with big-endian bytes `A B C D`:
///
/// | layout | wire words |
/// |--------|------------|
/// | `BE`   | `AB CD`    |
/// | `LE`   | `DC BA`    |
/// | `BEBS` | `BA DC`    |
/// | `LEBS` | `CD AB`    |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FloatLayout {
    word_order: WordOrder,
    byte_order: ByteOrder,
}

impl FloatLayout {
    pub(crate) const BE: FloatLayout = FloatLayout {
        word_order: WordOrder::HighFirst,
        byte_order: ByteOrder::Network,
    };
    pub(crate) const LE: FloatLayout = FloatLayout {
        word_order: WordOrder::LowFirst,
        byte_order: ByteOrder::Swapped,
    };
    pub(crate) const BEBS: FloatLayout = FloatLayout {
        word_order: WordOrder::HighFirst,
        byte_order: ByteOrder::Swapped,
    };
    pub(crate) const LEBS: FloatLayout = FloatLayout {
        word_order: WordOrder::LowFirst,
        byte_order: ByteOrder::Network,
    };

    /// Rearrange `[high, low]` network-order words into wire order.
    ///
    /// Both axis transforms are involutions, so the same function maps
    /// wire order back to `[high, low]`.
    fn apply(self, words: [u16; 2]) -> [u16; 2] {
        let [high, low] = words;
        let (a, b) = match self.byte_order {
            ByteOrder::Network => (high, low),
            ByteOrder::Swapped => (high.swap_bytes(), low.swap_bytes()),
        };
        match self.word_order {
            WordOrder::HighFirst => [a, b],
            WordOrder::LowFirst => [b, a],
        }
    }

    pub(crate) fn to_words(self, value: f32) -> [u16; 2] {
        let bits = value.to_bits();
        self.apply([(bits >> 16) as u16, bits as u16])
    }

    pub(crate) fn to_float(self, words: [u16; 2]) -> f32 {
        let [high, low] = self.apply(words);
        f32::from_bits((u32::from(high) << 16) | u32::from(low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 3.14f32 is 0x4048F5C3, i.e. bytes A B C D = 40 48 F5 C3
    const PI_ISH: f32 = 3.14;

    #[test]
    fn layouts_produce_the_documented_wire_words() {
        assert_eq!(FloatLayout::BE.to_words(PI_ISH), [0x4048, 0xF5C3]);
        assert_eq!(FloatLayout::LE.to_words(PI_ISH), [0xC3F5, 0x4840]);
        assert_eq!(FloatLayout::BEBS.to_words(PI_ISH), [0x4840, 0xC3F5]);
        assert_eq!(FloatLayout::LEBS.to_words(PI_ISH), [0xF5C3, 0x4048]);
    }

    #[test]
    fn every_layout_round_trips_bit_exactly() {
        let layouts = [
            FloatLayout::BE,
            FloatLayout::LE,
            FloatLayout::BEBS,
            FloatLayout::LEBS,
        ];
        let values = [
            0.0f32,
            -0.0,
            1.0,
            -1.5,
            PI_ISH,
            f32::MIN_POSITIVE,
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
        ];
        for layout in layouts {
            for value in values {
                let words = layout.to_words(value);
                assert_eq!(
                    layout.to_float(words).to_bits(),
                    value.to_bits(),
                    "{layout:?} failed for {value}"
                );
            }
        }
    }

    #[test]
    fn decoding_the_wrong_layout_scrambles_the_value() {
        let words = FloatLayout::BE.to_words(PI_ISH);
        assert_ne!(FloatLayout::LEBS.to_float(words), PI_ISH);
    }
}
