//! XTEA as used for the location records: 32 rounds over big endian 8 byte blocks, a trailing
//! partial block stays in plaintext.

const GOLDEN_RATIO: u32 = 0x9E37_79B9;
const ROUNDS: u32 = 32;

pub type XteaKey = [i32; 4];

pub fn is_empty_key(key: &XteaKey) -> bool {
    key.iter().all(|part| *part == 0)
}

fn block(data: &[u8]) -> (u32, u32) {
    (
        u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
        u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
    )
}

fn store_block(data: &mut [u8], v0: u32, v1: u32) {
    data[..4].copy_from_slice(&v0.to_be_bytes());
    data[4..8].copy_from_slice(&v1.to_be_bytes());
}

pub fn decipher(data: &mut [u8], key: &XteaKey) {
    if is_empty_key(key) {
        return;
    }

    let key = key.map(|part| part as u32);
    for chunk in data.chunks_exact_mut(8) {
        let (mut v0, mut v1) = block(chunk);
        let mut sum = GOLDEN_RATIO.wrapping_mul(ROUNDS);
        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)) ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
            );
            sum = sum.wrapping_sub(GOLDEN_RATIO);
            v0 = v0.wrapping_sub((((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ sum.wrapping_add(key[(sum & 3) as usize]));
        }
        store_block(chunk, v0, v1);
    }
}

pub fn encipher(data: &mut [u8], key: &XteaKey) {
    if is_empty_key(key) {
        return;
    }

    let key = key.map(|part| part as u32);
    for chunk in data.chunks_exact_mut(8) {
        let (mut v0, mut v1) = block(chunk);
        let mut sum = 0u32;
        for _ in 0..ROUNDS {
            v0 = v0.wrapping_add((((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ sum.wrapping_add(key[(sum & 3) as usize]));
            sum = sum.wrapping_add(GOLDEN_RATIO);
            v1 = v1.wrapping_add(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)) ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
            );
        }
        store_block(chunk, v0, v1);
    }
}

#[cfg(test)]
mod tests {
    use super::{decipher, encipher};

    #[test]
    fn decipher_inverts_encipher_and_keeps_tail() {
        let key = [0x1234_5678, -2, 77, 0x0BAD_F00D];
        let plain: Vec<u8> = (0u8..19).collect();

        let mut data = plain.clone();
        encipher(&mut data, &key);
        assert_ne!(data[..16], plain[..16]);
        assert_eq!(data[16..], plain[16..]);

        decipher(&mut data, &key);
        assert_eq!(data, plain);
    }

    #[test]
    fn zero_key_is_plaintext() {
        let mut data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        decipher(&mut data, &[0; 4]);
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
