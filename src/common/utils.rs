use std::cell::RefCell;
use std::rc::Rc;

pub type RcRc<A> = Rc<RefCell<A>>;

pub fn rcrc<A>(a: A) -> RcRc<A> {
    Rc::new(RefCell::new(a))
}

/// Renders a formal parameter list the way it is written in source.
pub fn arglist_string(params: &[String]) -> String {
    match params {
        [] => "OwO".to_owned(),
        [single] => format!("{} UwU", single),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn arglists() {
        assert_eq!(arglist_string(&params(&[])), "OwO");
        assert_eq!(arglist_string(&params(&["a"])), "a UwU");
        assert_eq!(arglist_string(&params(&["a", "b"])), "a and b");
        assert_eq!(arglist_string(&params(&["a", "b", "c"])), "a, b, and c");
    }
}
