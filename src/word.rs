//! Bit-level circuits over words of diagram nodes.
//!
//! A word is a slice of nodes, one Boolean function per bit, least significant
//! bit first. Binary circuits expect operands of equal width and produce a
//! result of that width; arithmetic wraps around modulo `2^width`.

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// The constant word holding the lowest `width` bits of `value`.
    pub fn const_bits(&self, value: i64, width: u32) -> Vec<Ref> {
        (0..width)
            .map(|i| self.constant(i < 64 && (value >> i) & 1 == 1))
            .collect()
    }

    /// Truncate `bits` or extend it to `width` bits, replicating the top bit when `is_signed`.
    pub fn resize_bits(&self, bits: &[Ref], width: u32, is_signed: bool) -> Vec<Ref> {
        let width = width as usize;
        if bits.len() >= width {
            return bits[..width].to_vec();
        }
        let fill = match bits.last() {
            Some(&msb) if is_signed => msb,
            _ => self.zero(),
        };
        let mut out = bits.to_vec();
        out.resize(width, fill);
        out
    }

    /// Whether every bit of `bits` is the constant false.
    pub fn is_const_zero(&self, bits: &[Ref]) -> bool {
        bits.iter().all(|&b| self.is_zero(b))
    }

    pub fn not_bits(&self, a: &[Ref]) -> Vec<Ref> {
        a.iter().map(|&x| -x).collect()
    }

    pub fn and_bits(&self, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(&x, &y)| self.apply_and(x, y)).collect()
    }

    pub fn or_bits(&self, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(&x, &y)| self.apply_or(x, y)).collect()
    }

    pub fn xor_bits(&self, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(&x, &y)| self.apply_xor(x, y)).collect()
    }

    /// Bitwise `c ? a : b`.
    pub fn ite_bits(&self, c: Ref, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(&x, &y)| self.apply_ite(c, x, y)).collect()
    }

    /// Ripple-carry sum `a + b + carry`, together with the carry out of the top bit.
    pub fn add_bits_with_carry(&self, a: &[Ref], b: &[Ref], carry: Ref) -> (Vec<Ref>, Ref) {
        assert_eq!(a.len(), b.len());
        let mut carry = carry;
        let mut out = Vec::with_capacity(a.len());
        for (&x, &y) in a.iter().zip(b) {
            let axb = self.apply_xor(x, y);
            out.push(self.apply_xor(axb, carry));
            // majority(x, y, carry)
            carry = self.apply_ite(axb, carry, x);
        }
        (out, carry)
    }

    pub fn add_bits(&self, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        self.add_bits_with_carry(a, b, self.zero()).0
    }

    /// `a - b = a + ~b + 1`.
    pub fn sub_bits(&self, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        self.add_bits_with_carry(a, &self.not_bits(b), self.one()).0
    }

    /// Two's-complement negation `~a + 1`.
    pub fn neg_bits(&self, a: &[Ref]) -> Vec<Ref> {
        let mut carry = self.one();
        let mut out = Vec::with_capacity(a.len());
        for &x in a {
            let nx = -x;
            out.push(self.apply_xor(nx, carry));
            carry = self.apply_and(nx, carry);
        }
        out
    }

    /// Shift-and-add product, keeping the low `a.len()` bits.
    pub fn mul_bits(&self, a: &[Ref], b: &[Ref]) -> Vec<Ref> {
        assert_eq!(a.len(), b.len());
        let w = a.len();
        let mut acc = vec![self.zero(); w];
        for i in 0..w {
            if self.is_zero(b[i]) {
                continue;
            }
            // partial = b[i] ? (a << i) : 0
            let partial: Vec<Ref> = (0..w)
                .map(|j| {
                    if j >= i {
                        self.apply_and(b[i], a[j - i])
                    } else {
                        self.zero()
                    }
                })
                .collect();
            acc = self.add_bits(&acc, &partial);
        }
        acc
    }

    /// Restoring division: unsigned quotient and remainder of `a / b`.
    ///
    /// For a zero divisor the quotient is all ones and the remainder is `a`.
    pub fn udivrem_bits(&self, a: &[Ref], b: &[Ref]) -> (Vec<Ref>, Vec<Ref>) {
        assert_eq!(a.len(), b.len());
        let w = a.len();

        // The partial remainder stays below 2*b, so one extra bit is enough.
        let divisor = self.resize_bits(b, w as u32 + 1, false);
        let mut r = vec![self.zero(); w + 1];
        let mut q = vec![self.zero(); w];

        for i in (0..w).rev() {
            // r = (r << 1) | a[i]
            r.pop();
            r.insert(0, a[i]);

            // The carry out of r + ~b + 1 is set iff r >= b.
            let (diff, ge) = self.add_bits_with_carry(&r, &self.not_bits(&divisor), self.one());
            r = self.ite_bits(ge, &diff, &r);
            q[i] = ge;
        }

        r.truncate(w);
        (q, r)
    }

    fn abs_bits(&self, a: &[Ref]) -> Vec<Ref> {
        let sign = a[a.len() - 1];
        self.ite_bits(sign, &self.neg_bits(a), a)
    }

    /// Signed quotient and remainder with C semantics: the quotient is
    /// truncated toward zero and the remainder takes the sign of the dividend.
    pub fn sdivrem_bits(&self, a: &[Ref], b: &[Ref]) -> (Vec<Ref>, Vec<Ref>) {
        assert_eq!(a.len(), b.len());
        let w = a.len();
        let a_sign = a[w - 1];
        let b_sign = b[w - 1];

        let (q, r) = self.udivrem_bits(&self.abs_bits(a), &self.abs_bits(b));
        let q_sign = self.apply_xor(a_sign, b_sign);
        let q = self.ite_bits(q_sign, &self.neg_bits(&q), &q);
        let r = self.ite_bits(a_sign, &self.neg_bits(&r), &r);
        (q, r)
    }

    /// `a == b`, the conjunction of bitwise XNORs.
    pub fn eq_bits(&self, a: &[Ref], b: &[Ref]) -> Ref {
        assert_eq!(a.len(), b.len());
        self.apply_and_many(a.iter().zip(b).map(|(&x, &y)| self.apply_eq(x, y)))
    }

    /// Unsigned `a < b`.
    pub fn ult_bits(&self, a: &[Ref], b: &[Ref]) -> Ref {
        assert_eq!(a.len(), b.len());
        // Walking up from the LSB, a differing bit overrides whatever the lower bits decided.
        a.iter().zip(b).fold(self.zero(), |lt, (&x, &y)| {
            let differ = self.apply_xor(x, y);
            self.apply_ite(differ, y, lt)
        })
    }

    /// Signed (two's-complement) `a < b`.
    pub fn slt_bits(&self, a: &[Ref], b: &[Ref]) -> Ref {
        assert_eq!(a.len(), b.len());
        assert!(!a.is_empty());
        // Inverting the sign bits maps two's-complement order onto unsigned order.
        let flip = |bits: &[Ref]| {
            let mut bits = bits.to_vec();
            if let Some(msb) = bits.last_mut() {
                *msb = -*msb;
            }
            bits
        };
        self.ult_bits(&flip(a), &flip(b))
    }

    /// Truth value of a word: whether any bit is set.
    pub fn truth_bits(&self, a: &[Ref]) -> Ref {
        self.apply_or_many(a.iter().copied())
    }

    /// Value of the constant word `bits`, or `None` if some bit is not constant.
    pub fn const_value(&self, bits: &[Ref]) -> Option<u64> {
        bits.iter().enumerate().try_fold(0u64, |acc, (i, &b)| {
            if self.is_one(b) {
                Some(acc | (1 << i))
            } else if self.is_zero(b) {
                Some(acc)
            } else {
                None
            }
        })
    }
}
