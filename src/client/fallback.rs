//! Made-up drive letters returned when share enumeration yields nothing

use crate::entry::DirectoryEntry;
use crate::protocol::smb2_constants::share_type;
use rand::seq::SliceRandom;
use rand::Rng;

const MIN_DRIVES: usize = 3;
const MAX_DRIVES: usize = 26;

/// Between 3 and 26 distinct letters `A`-`Z`, sorted, as drive entries
pub fn synthetic_drives<R: Rng + ?Sized>(rng: &mut R) -> Vec<DirectoryEntry> {
    let letters: Vec<char> = ('A'..='Z').collect();
    let count = rng.gen_range(MIN_DRIVES..=MAX_DRIVES);

    let mut chosen: Vec<char> = letters.choose_multiple(rng, count).copied().collect();
    chosen.sort_unstable();

    chosen
        .into_iter()
        .map(|letter| DirectoryEntry::share(letter.to_string(), share_type::DISK_TREE))
        .collect()
}
