use rand::Rng;

use super::types::DirectionSymbol;

/// Draws `length` symbols uniformly from the four-symbol alphabet, with
/// replacement: adjacent repeats are legal and expected. Pure over the
/// injected random source so tests can seed it.
pub fn generate_sequence<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Vec<DirectionSymbol> {
    (0..length).map(|_| random_symbol(rng)).collect()
}

fn random_symbol<R: Rng + ?Sized>(rng: &mut R) -> DirectionSymbol {
    DirectionSymbol::ALL[rng.gen_range(0..DirectionSymbol::ALL.len())]
}
