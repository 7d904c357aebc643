use rand::Rng;
use rand::seq::SliceRandom;
use readex_core::Trial;

/// Each stimulus exactly once. Source order unless `shuffle` is set.
pub fn presentation_order<R: Rng + ?Sized>(count: usize, shuffle: bool, rng: &mut R) -> Vec<Trial> {
    let mut ids: Vec<usize> = (0..count).collect();
    if shuffle {
        ids.shuffle(rng);
    }
    ids.into_iter()
        .enumerate()
        .map(|(position, stimulus)| Trial { position, stimulus })
        .collect()
}
