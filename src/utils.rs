use std::time::Duration;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}


#[cfg(test)]
mod tests {

    use std::time::Duration;

    use crate::utils::to_millis;

    #[test]
    fn millis() {
        assert_eq!(to_millis(Duration::new(2, 345_678_901)), 2_345);
        assert_eq!(to_millis(Duration::from_millis(0)), 0);
    }
}
