use rand::Rng;

/// Bernoulli trials with `f32` probabilities,
/// the way every chance in the configurations
/// is expressed.
pub trait Chance {
    /// Returns `true` with probability `chance`.
    /// Values outside of `[0, 1]` saturate.
    fn chance(&mut self, chance: f32) -> bool;
}

impl<T: Rng + ?Sized> Chance for T {
    fn chance(&mut self, chance: f32) -> bool {
        self.gen::<f32>() < chance
    }
}

/// (De)serializes a [`ChaCha8Rng`] as its seed, stream and
/// word position, so that a restored generator continues the
/// exact same sequence. The 128-bit position is split in halves.
///
/// [`ChaCha8Rng`]: rand_chacha::ChaCha8Rng
pub(crate) mod chacha_state {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct State {
        seed: [u8; 32],
        stream: u64,
        word_pos_high: u64,
        word_pos_low: u64,
    }

    pub fn serialize<S: Serializer>(rng: &ChaCha8Rng, serializer: S) -> Result<S::Ok, S::Error> {
        let word_pos = rng.get_word_pos();
        State {
            seed: rng.get_seed(),
            stream: rng.get_stream(),
            word_pos_high: (word_pos >> 64) as u64,
            word_pos_low: word_pos as u64,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChaCha8Rng, D::Error> {
        let state = State::deserialize(deserializer)?;
        let mut rng = ChaCha8Rng::from_seed(state.seed);
        rng.set_stream(state.stream);
        rng.set_word_pos(((state.word_pos_high as u128) << 64) | state.word_pos_low as u128);
        Ok(rng)
    }
}
