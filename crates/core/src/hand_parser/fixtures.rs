//! Hand-history samples shared by parser and statistics tests.

/// Hero calls a raise from the big blind, bets the flop and takes it down.
pub(crate) const STARS_HAND_WON: &str = "\
PokerStars Hand #245001: Hold'em No Limit ($0.01/$0.02 USD) - 2026/09/14 14:15:03 ET
Table 'Alpha' 6-max Seat #1 is the button
Seat 1: Villain1 ($2.00 in chips)
Seat 2: Villain2 ($2.00 in chips)
Seat 3: Hero ($2.00 in chips)
Villain2: posts small blind $0.01
Hero: posts big blind $0.02
*** HOLE CARDS ***
Dealt to Hero [Ah Kd]
Villain1: raises $0.04 to $0.06
Villain2: folds
Hero: calls $0.04
*** FLOP *** [2c 7h Jd]
Hero: bets $0.08
Villain1: folds
Uncalled bet ($0.08) returned to Hero
Hero collected $0.13 from pot
Hero: doesn't show hand
*** SUMMARY ***
Total pot $0.13 | Rake $0
Board [2c 7h Jd]
Seat 1: Villain1 (button) folded on the Flop
Seat 2: Villain2 (small blind) folded before Flop
Seat 3: Hero (big blind) collected ($0.13)
";

/// Hero opens on the button, barrels three streets and loses at showdown.
pub(crate) const STARS_RAISE_AND_LOSE: &str = "\
PokerStars Hand #245002: Hold'em No Limit ($0.01/$0.02 USD) - 2026/09/14 14:17:41 ET
Table 'Alpha' 6-max Seat #2 is the button
Seat 1: Villain1 ($0.70 in chips)
Seat 2: Hero ($2.00 in chips)
Seat 3: Villain2 ($2.00 in chips)
Villain2: posts small blind $0.01
Villain1: posts big blind $0.02
*** HOLE CARDS ***
Dealt to Hero [Qs Qh]
Hero: raises $0.04 to $0.06
Villain2: folds
Villain1: calls $0.04
*** FLOP *** [9c 5d 2s]
Villain1: checks
Hero: bets $0.10
Villain1: calls $0.10
*** TURN *** [9c 5d 2s] [Kh]
Villain1: checks
Hero: bets $0.24
Villain1: calls $0.24
*** RIVER *** [9c 5d 2s Kh] [Ts]
Villain1: checks
Hero: bets $0.80
Villain1: calls $0.30 and is all-in
Uncalled bet ($0.50) returned to Hero
*** SHOW DOWN ***
Villain1: shows [5h 5s] (three of a kind, Fives)
Hero: shows [Qs Qh] (a pair of Queens)
Villain1 collected $1.41 from pot
*** SUMMARY ***
Total pot $1.41 | Rake $0
Board [9c 5d 2s Kh Ts]
Seat 1: Villain1 (big blind) showed [5h 5s] and won ($1.41)
Seat 2: Hero (button) showed [Qs Qh] and lost
Seat 3: Villain2 (small blind) folded before Flop
";

/// Hero folds under the gun.
pub(crate) const STARS_FOLD_PREFLOP: &str = "\
PokerStars Hand #245003: Hold'em No Limit ($0.01/$0.02 USD) - 2026/09/14 14:19:02 ET
Table 'Alpha' 6-max Seat #1 is the button
Seat 1: Villain1 ($2.00 in chips)
Seat 2: Villain2 ($2.00 in chips)
Seat 3: Villain3 ($2.00 in chips)
Seat 4: Hero ($2.00 in chips)
Villain2: posts small blind $0.01
Villain3: posts big blind $0.02
*** HOLE CARDS ***
Dealt to Hero [7c 2d]
Hero: folds
Villain1: folds
Villain2: raises $0.04 to $0.06
Villain3: folds
Uncalled bet ($0.04) returned to Villain2
Villain2 collected $0.04 from pot
Villain2: doesn't show hand
*** SUMMARY ***
Total pot $0.04 | Rake $0
Seat 1: Villain1 (button) folded before Flop (didn't bet)
Seat 2: Villain2 (small blind) collected ($0.04)
Seat 3: Villain3 (big blind) folded before Flop
Seat 4: Hero folded before Flop (didn't bet)
";

/// GGPoker Rush & Cash export; opponents are anonymized.
pub(crate) const GG_HAND: &str = "\
Poker Hand #RC1000001: Hold'em No Limit ($0.02/$0.05) - 2026/09/20 09:30:00
Table 'RushAndCash12345' 6-max Seat #3 is the button
Seat 1: 7a8b9c ($5.00 in chips)
Seat 3: Hero ($5.00 in chips)
Seat 5: d1e2f3 ($5.00 in chips)
d1e2f3: posts small blind $0.02
7a8b9c: posts big blind $0.05
*** HOLE CARDS ***
Dealt to 7a8b9c
Dealt to Hero [Jc Jd]
Dealt to d1e2f3
Hero: raises $0.10 to $0.15
d1e2f3: folds
7a8b9c: folds
Uncalled bet ($0.10) returned to Hero
*** SHOWDOWN ***
Hero collected $0.12 from pot
*** SUMMARY ***
Total pot $0.12 | Rake $0 | Jackpot $0
Seat 1: 7a8b9c (big blind) folded before Flop
Seat 3: Hero (button) won ($0.12)
Seat 5: d1e2f3 (small blind) folded before Flop
";
