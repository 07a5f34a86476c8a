//! Trade quotes from the bank and from other players.

use crate::pieces::Port;
use crate::player::PlayerRef;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// Bank exchange rate without a port
pub const BANK_RATE: u32 = 4;

/// A trade offer, seen from the asking player's side.
///
/// The asker receives `receive_num` of `receive_type` and gives `give_num`
/// of `give_type`. No bidder means the bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    pub bidder: Option<PlayerRef>,
    pub receive_type: Resource,
    pub receive_num: u32,
    pub give_type: Resource,
    pub give_num: u32,
}

impl Quote {
    pub fn new(
        bidder: Option<PlayerRef>,
        receive_type: Resource,
        receive_num: u32,
        give_type: Resource,
        give_num: u32,
    ) -> Self {
        Self {
            bidder,
            receive_type,
            receive_num,
            give_type,
            give_num,
        }
    }

    pub fn is_bank(&self) -> bool {
        self.bidder.is_none()
    }

    /// Same resource pair, whatever the amounts
    fn same_pair(&self, other: &Quote) -> bool {
        self.receive_type == other.receive_type && self.give_type == other.give_type
    }

    /// Fewer cards given per card received than `other`
    fn cheaper_than(&self, other: &Quote) -> bool {
        self.give_num * other.receive_num < other.give_num * self.receive_num
    }
}

/// Bank quotes for every wanted/given pair at 4:1 and at each port rate
pub fn bank_quotes(want: &[Resource], give: &[Resource], ports: &[Port]) -> Vec<Quote> {
    let mut quotes = Vec::new();
    for &receive in want {
        for &pay in give {
            if receive == pay {
                continue;
            }
            let mut rates = vec![BANK_RATE];
            rates.extend(ports.iter().filter(|p| p.accepts(pay)).map(|p| p.rate()));
            rates.sort_unstable();
            rates.dedup();
            for rate in rates {
                quotes.push(Quote::new(None, receive, 1, pay, rate));
            }
        }
    }
    quotes
}

/// Drop bank quotes beaten by a strictly better rate for the same resource pair
pub fn prune(quotes: Vec<Quote>) -> Vec<Quote> {
    quotes
        .iter()
        .filter(|q| {
            !q.is_bank()
                || !quotes
                    .iter()
                    .any(|other| other.same_pair(q) && other.cheaper_than(q))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bank_quotes_without_ports() {
        let quotes = bank_quotes(&[Resource::Ore], &[Resource::Wood, Resource::Ore], &[]);
        assert_eq!(quotes, vec![Quote::new(None, Resource::Ore, 1, Resource::Wood, 4)]);
    }

    #[test]
    fn test_port_rates_are_pruned_to_best() {
        let ports = [Port::Generic, Port::Specific(Resource::Wood)];
        let quotes = prune(bank_quotes(
            &[Resource::Ore],
            &[Resource::Wood, Resource::Sheep],
            &ports,
        ));
        assert_eq!(
            quotes,
            vec![
                Quote::new(None, Resource::Ore, 1, Resource::Wood, 2),
                Quote::new(None, Resource::Ore, 1, Resource::Sheep, 3),
            ]
        );
    }

    #[test]
    fn test_player_quote_beats_bank() {
        let bidder = PlayerRef::new("bea", Color::Blue);
        let mut quotes = bank_quotes(&[Resource::Brick], &[Resource::Wheat], &[]);
        quotes.push(Quote::new(Some(bidder.clone()), Resource::Brick, 1, Resource::Wheat, 1));
        let pruned = prune(quotes);
        assert_eq!(
            pruned,
            vec![Quote::new(Some(bidder), Resource::Brick, 1, Resource::Wheat, 1)]
        );
    }

    #[test]
    fn test_better_rate_prunes_bank_despite_other_amounts() {
        let bidder = PlayerRef::new("bea", Color::Blue);
        let bulk = Quote::new(Some(bidder.clone()), Resource::Wood, 2, Resource::Ore, 3);
        let mut quotes = bank_quotes(&[Resource::Wood], &[Resource::Ore], &[Port::Generic]);
        quotes.push(bulk.clone());
        // 1.5 ore per wood beats both 4:1 and 3:1
        assert_eq!(prune(quotes), vec![bulk]);

        // 5 for 1 is worse than the bank, so the 4:1 quote stays
        let steep = Quote::new(Some(bidder), Resource::Wood, 1, Resource::Ore, 5);
        let mut quotes = bank_quotes(&[Resource::Wood], &[Resource::Ore], &[]);
        quotes.push(steep.clone());
        assert_eq!(
            prune(quotes),
            vec![Quote::new(None, Resource::Wood, 1, Resource::Ore, 4), steep]
        );
    }

    #[test]
    fn test_player_quotes_are_never_pruned() {
        let a = PlayerRef::new("a", Color::Red);
        let b = PlayerRef::new("b", Color::White);
        let quotes = vec![
            Quote::new(Some(a), Resource::Ore, 1, Resource::Wood, 3),
            Quote::new(Some(b), Resource::Ore, 1, Resource::Wood, 1),
        ];
        assert_eq!(prune(quotes.clone()), quotes);
    }
}
