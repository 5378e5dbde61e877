//! RC4 stream cipher for the PDF 1.4/1.5 security handlers.
//!
//! PDF Spec: Section 7.6.2 - General Encryption Algorithm
//!
//! RC4 is symmetric: the same call encrypts and decrypts.

/// RC4 keystream state.
struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Run the key-scheduling algorithm. Keys are 5-16 bytes in PDF.
    fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (idx, slot) in s.iter_mut().enumerate() {
            *slot = idx as u8;
        }

        if !key.is_empty() {
            let mut j = 0u8;
            for idx in 0..256 {
                j = j.wrapping_add(s[idx]).wrapping_add(key[idx % key.len()]);
                s.swap(idx, j as usize);
            }
        }

        Self { s, i: 0, j: 0 }
    }

    fn xor_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.s[self.i as usize]);
            self.s.swap(self.i as usize, self.j as usize);
            let k = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
            *byte ^= self.s[k as usize];
        }
    }
}

/// Encrypt or decrypt `data` with `key`.
pub fn rc4_crypt(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    Rc4::new(key).xor_in_place(&mut out);
    out
}
