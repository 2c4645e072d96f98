//! Shared DIMACS inputs for tests.

pub(crate) const ARTICLE_EXAMPLE: &str = "c 8 variables, 44 clauses
p cnf 8 44
4 -2 3 0
1 -7 -4 0
-5 3 -6 0
2 4 -6 0
2 6 -3 0
4 -7 2 0
-8 -5 7 0
-1 4 5 0
3 6 2 0
-6 5 -3 0
-6 -3 1 0
3 -8 -2 0
-7 -4 2 0
6 -4 1 0
5 -3 7 0
5 4 3 0
1 -4 7 0
5 2 -4 0
-8 4 -6 0
-8 7 4 0
5 6 -3 0
-6 8 -3 0
-2 -8 4 0
1 2 5 0
4 8 6 0
1 6 -3 0
3 8 -1 0
-1 -7 4 0
5 -1 2 0
4 5 -3 0
-2 1 -5 0
-2 1 -6 0
5 2 -6 0
7 -1 -4 0
7 -4 8 0
-4 7 2 0
-1 -2 3 0
-5 4 1 0
-6 8 -1 0
7 4 6 0
4 8 5 0
-2 8 -4 0
-5 7 1 0
6 -1 -4 0
%
0
";
