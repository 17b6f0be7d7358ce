use rand::Rng;

/// Alphabet for room identifiers. Uppercase only so ids are case-normalized
/// and easy to read aloud or type from a shared link.
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_ID_LEN: usize = 6;

/// Trait for generating room identifiers
pub trait RoomIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform random short-id generator.
///
/// Performs no uniqueness check of its own: with 36^6 possible ids a
/// collision against live rooms is possible, and the room store is expected
/// to verify and re-draw before committing.
pub struct RandomRoomIdGenerator;

impl RandomRoomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomRoomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomIdGenerator for RandomRoomIdGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..ROOM_ID_LEN)
            .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
            .collect()
    }
}
