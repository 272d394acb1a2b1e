use hashrace_types::{AccountAddress, BlockHash, CommitmentHash, Score};

/// Bytewise XOR of two 32-byte words.
pub fn xor32(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = a[i] ^ b[i];
    }
    out
}

/// Commitment for a not-yet-disclosed solution: H(solution).
pub fn solution_commitment(solution: &[u8]) -> CommitmentHash {
    CommitmentHash::from_bytes(*blake3::hash(solution).as_bytes())
}

/// Digest of an engine address, the deployment-binding term of the score.
pub fn address_digest(address: &AccountAddress) -> [u8; 32] {
    *blake3::hash(address.as_bytes()).as_bytes()
}

/// Score a revealed solution against a task.
///
/// Formula: NOT(H(solution) XOR task XOR H(address)), read as a big-endian
/// 256-bit unsigned integer. Higher is better; an all-zero XOR yields
/// `Score::MAX`. This complement-and-compare form is the single canonical
/// convention; off-ledger predictors must use this exact function.
///
/// Binding the engine address prevents precomputing a universally-best
/// solution; binding the task prevents reuse across tasks.
pub fn score_solution(address: &AccountAddress, task: &BlockHash, solution: &[u8]) -> Score {
    let mixed = xor32(
        blake3::hash(solution).as_bytes(),
        &xor32(task.as_bytes(), &address_digest(address)),
    );

    let mut complemented = [0u8; 32];
    for (i, byte) in complemented.iter_mut().enumerate() {
        *byte = !mixed[i];
    }
    Score::from_bytes(complemented)
}

/// Number of leading zero bits in a 32-byte word (0..=256).
pub fn leading_zero_bits(bytes: &[u8; 32]) -> u32 {
    let mut count = 0;
    for byte in bytes {
        if *byte == 0 {
            count += 8;
        } else {
            count += byte.leading_zeros();
            break;
        }
    }
    count
}

/// Human-readable difficulty of a solution: leading zero bits of the XOR
/// mix, plus one. Order-compatible with `score_solution` at the top end but
/// NOT numerically equivalent. Display only, never compare with it.
pub fn difficulty_estimate(address: &AccountAddress, task: &BlockHash, solution: &[u8]) -> u32 {
    let mixed = xor32(
        blake3::hash(solution).as_bytes(),
        &xor32(task.as_bytes(), &address_digest(address)),
    );
    leading_zero_bits(&mixed) + 1
}
